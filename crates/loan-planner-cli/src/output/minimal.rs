use serde_json::Value;

/// Print just the headline number from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first non-null field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "months_saved",
        "health_score",
        "debt_to_income_ratio",
        "savings_potential",
        "monthly_payment",
        "total_expenses",
        "total",
        "monthly_income",
        "deleted",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }
        // A portfolio optimization reports its best pairing.
        if let Some(best) = map.get("best").and_then(|b| b.get("months_saved")) {
            return format_minimal(best);
        }
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_null()) {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    if let Value::Array(items) = result_obj {
        return items.len().to_string();
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_key_wins() {
        let value = json!({ "result": { "loan_id": "a", "monthly_payment": "8884.88" } });
        assert_eq!(minimal_line(&value), "8884.88");
    }

    #[test]
    fn test_undefined_ratio_falls_through() {
        let value = json!({ "result": { "loan_count": 2, "health_score": null, "debt_to_income_ratio": null } });
        assert_eq!(minimal_line(&value), "loan_count: 2");
    }

    #[test]
    fn test_list_prints_count() {
        let value = json!({ "result": [{"id": "a"}, {"id": "b"}] });
        assert_eq!(minimal_line(&value), "2");
    }
}
