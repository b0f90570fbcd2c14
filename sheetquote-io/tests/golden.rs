use serde_json::Value;
use sheetquote_core::drawing::{Drawing, Entity};

/// 快照中的浮点统一保留 6 位小数，避免角度换算的末位误差影响比较。
const PRECISION: f64 = 1e6;

pub fn entities_snapshot(drawing: &Drawing) -> Value {
    let entities: Vec<&Entity> = drawing.entities().collect();
    let value = serde_json::to_value(entities).expect("序列化实体快照失败");
    round_numbers(value)
}

pub fn block_snapshot(drawing: &Drawing, name: &str) -> Value {
    let block = drawing
        .block(name)
        .unwrap_or_else(|| panic!("未找到块 {name}"));
    let value = serde_json::to_value(block).expect("序列化块快照失败");
    round_numbers(value)
}

pub fn assert_snapshot(name: &str, actual: &Value, expected: &Value) {
    if actual != expected {
        panic!(
            "快照 {name} 与期望不一致\n期望: {}\n实际: {}",
            serde_json::to_string_pretty(expected).unwrap_or_default(),
            serde_json::to_string_pretty(actual).unwrap_or_default()
        );
    }
}

fn round_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(raw) => {
                let rounded = (raw * PRECISION).round() / PRECISION;
                // 去掉 -0.0，保证与期望中的 0.0 一致
                let rounded = if rounded == 0.0 { 0.0 } else { rounded };
                serde_json::Number::from_f64(rounded)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            None => Value::Number(number),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(round_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, round_numbers(value)))
                .collect(),
        ),
        other => other,
    }
}
