use serde_json::Value;
use strategy::RawRecord;

use crate::feed::FeedError;

/// Decodes a DexScreener pairs payload (`{"pairs": [...]}`) or a bare array of
/// pair objects. Individual pairs are decoded leniently: a field of the wrong
/// type reads as missing instead of failing the whole payload.
pub fn parse_dexscreener_pairs(body: &str) -> Result<Vec<RawRecord>, FeedError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|err| FeedError::Decode(err.to_string()))?;

    let pairs = match &payload {
        Value::Array(pairs) => pairs.as_slice(),
        Value::Object(object) => match object.get("pairs") {
            Some(Value::Array(pairs)) => pairs.as_slice(),
            Some(Value::Null) | None => &[] as &[Value],
            Some(_) => {
                return Err(FeedError::Decode("`pairs` is not an array".to_string()));
            }
        },
        _ => {
            return Err(FeedError::Decode(
                "expected an object or an array of pairs".to_string(),
            ));
        }
    };

    Ok(pairs.iter().map(decode_pair).collect())
}

fn decode_pair(pair: &Value) -> RawRecord {
    RawRecord {
        name: text_at(pair, &["baseToken", "name"]).or_else(|| text_at(pair, &["name"])),
        symbol: text_at(pair, &["baseToken", "symbol"]).or_else(|| text_at(pair, &["symbol"])),
        price: number_at(pair, &["priceUsd"]).or_else(|| number_at(pair, &["price"])),
        liquidity_usd: number_at(pair, &["liquidity", "usd"]),
        volume_24h_usd: number_at(pair, &["volume", "h24"])
            .or_else(|| number_at(pair, &["volume_24h", "usd"])),
        fdv: number_at(pair, &["fdv"]),
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    lookup(value, path)?
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn number_at(value: &Value, path: &[&str]) -> Option<f64> {
    let number = match lookup(value, path)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}
