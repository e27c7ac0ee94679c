use serde_json::Value;
use std::io;

/// Write the output as CSV to stdout.
///
/// Schedule-like results become one CSV row per entry; sensitivity reports
/// become one row per scenario; everything else degrades to field,value
/// pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                if let Some(Value::Array(records)) = result.get("records") {
                    write_rows(&mut wtr, records);
                } else if let Some(Value::Object(scenarios)) = result.get("scenarios") {
                    write_scenarios(&mut wtr, scenarios);
                } else if let Some(Value::Array(rows)) = result.get("rows") {
                    write_rows(&mut wtr, rows);
                } else {
                    write_fields(&mut wtr, result);
                }
            }
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn write_scenarios(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    scenarios: &serde_json::Map<String, Value>,
) {
    let _ = wtr.write_record([
        "scenario",
        "monthly_net_cashflow",
        "net_annual_return",
        "total_annual_return",
        "cashflow_change",
        "return_change",
    ]);

    for (name, outcome) in scenarios {
        let field = |key: &str| outcome.get(key).map(format_csv_value).unwrap_or_default();
        let change = |key: &str| {
            outcome
                .get("changes")
                .and_then(|c| c.get(key))
                .map(format_csv_value)
                .unwrap_or_default()
        };
        let _ = wtr.write_record([
            name.clone(),
            field("monthly_net_cashflow"),
            field("net_annual_return"),
            field("total_annual_return"),
            change("monthly_net_cashflow"),
            change("net_annual_return"),
        ]);
    }
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
