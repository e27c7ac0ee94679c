use serde_json::Value;

/// Print just the headline answer.
///
/// Metrics lead with the cash-on-cash return, projections with the final
/// equity position, comparisons with the winning study id.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Schedule-like results answer from their aggregate section
    let focus = result
        .as_object()
        .and_then(|m| {
            m.get("summary")
                .or_else(|| m.get("winners"))
                .or_else(|| m.get("base_scenario"))
        })
        .unwrap_or(result);

    let priority_keys = [
        "net_annual_return",
        "final_accumulated_equity",
        "best_monthly_cashflow",
        "monthly_net_cashflow",
    ];

    if let Value::Object(map) = focus {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to the first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(focus));
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
