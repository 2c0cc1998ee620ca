//! Descriptor type to target model type mapping.

/// Map an abstract descriptor type name to the target model type name.
pub fn map_type(source_type: &str) -> String {
    let base = source_type.to_lowercase();
    match base.as_str() {
        "string" | "text" => "String",
        "long" => "BigInteger",
        "integer" | "int" | "short" => "Integer",
        "timestamp" | "datetime" => "DateTime",
        "date" => "Date",
        "time" => "Time",
        "boolean" | "bool" => "Boolean",
        "double" | "float" => "Float",
        "decimal" | "big_decimal" => "Decimal",

        // Default: keep original
        _ => return source_type.to_string(),
    }
    .to_string()
}
