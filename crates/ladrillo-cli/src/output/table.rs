use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Render the output as tables.
///
/// Knows the engine's schedule-like shapes: projection records, sensitivity
/// scenarios, and comparison rows each get a row-per-entry table. Everything
/// else falls back to a two-column field/value table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_footer(map);
            } else {
                print_fields(value);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let Some(map) = result.as_object() else {
        println!("{}", result);
        return;
    };

    if let Some(Value::Array(records)) = map.get("records") {
        // Projection: the monthly schedule, then the horizon aggregates
        print_rows(records);
        if let Some(summary) = map.get("summary") {
            println!("\nSummary:");
            print_fields(summary);
        }
    } else if let Some(Value::Object(scenarios)) = map.get("scenarios") {
        // Sensitivity: the base metrics, then one row per scenario
        if let Some(base) = map.get("base_scenario") {
            println!("Base scenario:");
            print_fields(base);
        }
        println!("\nScenarios:");
        print_scenarios(scenarios);
    } else if let Some(Value::Array(rows)) = map.get("rows") {
        // Comparison: the side-by-side rows, then the winners
        print_rows(rows);
        if let Some(winners) = map.get("winners") {
            println!("\nWinners:");
            print_fields(winners);
        }
    } else {
        print_fields(result);
    }
}

fn print_scenarios(scenarios: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record([
        "scenario",
        "monthly_net_cashflow",
        "net_annual_return",
        "total_annual_return",
        "cashflow_change",
    ]);

    for (name, outcome) in scenarios {
        let cell = |key: &str| outcome.get(key).map(format_value).unwrap_or_default();
        let change = outcome
            .get("changes")
            .and_then(|c| c.get("monthly_net_cashflow"))
            .map(format_value)
            .unwrap_or_default();
        builder.push_record([
            name.clone(),
            cell("monthly_net_cashflow"),
            cell("net_annual_return"),
            cell("total_annual_return"),
            change,
        ]);
    }

    println!("{}", Table::from(builder));
}

fn print_fields(value: &Value) {
    let Some(map) = value.as_object() else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn print_footer(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
