use std::fmt::{Display, Write};

pub fn format_comma_delimited<I: IntoIterator<Item = T>, T: Display>(items: I) -> String {
    let mut result = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            result.push(',');
        }
        // Writing into a String cannot fail
        let _ = write!(result, "{item}");
    }
    result
}
