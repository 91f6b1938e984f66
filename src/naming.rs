//! Naming transforms shared by every generation driver.
//!
//! Class names are studly, variables camel, tables and columns snake,
//! resource URI segments kebab-plural.
use convert_case::{Case, Casing};

pub fn studly(name: &str) -> String {
    name.to_case(Case::Pascal)
}

pub fn camel(name: &str) -> String {
    name.to_case(Case::Camel)
}

pub fn snake(name: &str) -> String {
    name.to_case(Case::Snake)
}

pub fn kebab(name: &str) -> String {
    name.to_case(Case::Kebab)
}

/// Default table name for an entity: snake case, pluralized.
pub fn snake_plural(name: &str) -> String {
    pluralize(&snake(name))
}

/// Resource URI segment: kebab case, pluralized (`BlogPost` -> `blog-posts`).
pub fn resource_segment(name: &str) -> String {
    pluralize(&kebab(name))
}

/// Singular form of a table name, for deriving model names from
/// `foreign:<table>` targets.
pub fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if ["ches", "shes", "sses", "xes", "zes"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return word[..word.len() - 2].to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() && !word.ends_with("ss") {
            return stem.to_string();
        }
    }
    word.to_string()
}

/// English plural with the small rule set schema names actually use.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();
    match lower.as_str() {
        "person" => return "people".to_string(),
        "child" => return "children".to_string(),
        "man" => return "men".to_string(),
        "woman" => return "women".to_string(),
        _ => {}
    }
    if let Some(stem) = consonant_y_stem(word) {
        return format!("{stem}ies");
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if lower.ends_with('f') {
        return format!("{}ves", &word[..word.len() - 1]);
    }
    if lower.ends_with("fe") {
        return format!("{}ves", &word[..word.len() - 2]);
    }
    format!("{word}s")
}

fn consonant_y_stem(word: &str) -> Option<&str> {
    let stem = word.strip_suffix('y')?;
    let last = stem.chars().last()?;
    if matches!(last, 'a' | 'e' | 'i' | 'o' | 'u') {
        None
    } else {
        Some(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_common_schema_names() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("person"), "people");
    }

    #[test]
    fn singular_inverts_the_common_cases() {
        assert_eq!(singular("users"), "user");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("statuses"), "status");
        assert_eq!(singular("boxes"), "box");
    }

    #[test]
    fn table_and_resource_names() {
        assert_eq!(snake_plural("BlogPost"), "blog_posts");
        assert_eq!(resource_segment("BlogPost"), "blog-posts");
        assert_eq!(studly("blog_post"), "BlogPost");
        assert_eq!(camel("BlogPost"), "blogPost");
    }
}
