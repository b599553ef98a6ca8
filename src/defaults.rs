use serde_json::{Map, Value};

/// Layer a defaults template onto a (possibly partial) configuration.
///
/// For each key in the template:
/// * absent (or `null`) in the target: the default is copied in
/// * an object in both: the merge recurses into it
/// * anything else already in the target is a terminal value and is left untouched
///
/// Arrays are terminal values, so a supplied list is never padded with default items. A `null`
/// target (e.g. an absent section) takes the whole default; any other non-object target is kept.
pub fn add_defaults(target: &mut Value, defaults: &Value) {
    let Value::Object(default_fields) = defaults else {
        if target.is_null() {
            *target = defaults.clone();
        }
        return;
    };

    if !target.is_object() {
        if !target.is_null() {
            return;
        }
        *target = Value::Object(Map::new());
    }

    if let Value::Object(target_fields) = target {
        for (key, default_value) in default_fields {
            match target_fields.get_mut(key) {
                Some(existing) if !existing.is_null() => {
                    if existing.is_object() && default_value.is_object() {
                        add_defaults(existing, default_value);
                    }
                }
                _ => {
                    target_fields.insert(key.clone(), default_value.clone());
                }
            }
        }
    }
}
