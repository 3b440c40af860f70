pub mod logger;

use validator::ValidationErrors;

/// Joins every field-level validation message into one `; `-separated line.
///
/// Errors without a custom `message` fall back to `"<field> is invalid"`.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct ZoneReq {
        #[validate(range(min = 1, message = "radius must be positive"))]
        radius: i64,
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn joins_messages_in_field_order() {
        let req = ZoneReq {
            radius: 0,
            name: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(
            format_validation_errors(&errors),
            "name is invalid; radius must be positive"
        );
    }
}
