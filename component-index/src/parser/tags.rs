//! Static tag inference for component names.

/// Tags inferred from a lowercased component directory name.
///
/// Unknown names fall back to `["ui"]`; the universal `react` and
/// `component` tags are appended by the caller.
pub fn inferred_tags(name: &str) -> &'static [&'static str] {
    match name {
        "button" => &["form", "action", "ui", "interactive"],
        "input" | "select" | "checkbox" | "radio" | "switch" | "slider" | "upload" => {
            &["form", "data-entry", "ui"]
        }
        "form" => &["data-entry", "validation", "ui"],
        "table" => &["data-display", "list", "ui"],
        "modal" => &["feedback", "overlay", "ui"],
        "tooltip" | "popover" => &["data-display", "overlay", "ui"],
        "alert" => &["feedback", "message", "ui"],
        "progress" | "spin" => &["feedback", "loading", "ui"],
        "card" | "avatar" | "badge" | "tag" => &["data-display", "ui"],
        "menu" | "breadcrumb" | "tabs" | "dropdown" => &["navigation", "ui"],
        "pagination" => &["navigation", "data-display", "ui"],
        _ => &["ui"],
    }
}

/// Full tag set for a component: inferred tags plus the universal ones,
/// deduplicated in first-seen order.
pub fn tags_for(dir_name: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in inferred_tags(&dir_name.to_lowercase()) {
        if !out.iter().any(|t| t == tag) {
            out.push((*tag).to_string());
        }
    }
    for tag in ["react", "component"] {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_gets_interactive_tags() {
        let tags = tags_for("button");
        assert_eq!(
            tags,
            vec!["form", "action", "ui", "interactive", "react", "component"]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(tags_for("Button"), tags_for("button"));
    }

    #[test]
    fn unknown_names_fall_back_to_ui() {
        assert_eq!(tags_for("date-picker"), vec!["ui", "react", "component"]);
    }

    #[test]
    fn form_inputs_share_data_entry() {
        for name in ["input", "select", "checkbox", "radio", "switch", "slider", "upload"] {
            let tags = tags_for(name);
            assert!(tags.contains(&"form".to_string()), "{name}");
            assert!(tags.contains(&"data-entry".to_string()), "{name}");
        }
    }

    #[test]
    fn universal_tags_always_present() {
        for name in ["button", "table", "pagination", "something-custom"] {
            let tags = tags_for(name);
            assert!(tags.contains(&"react".to_string()));
            assert!(tags.contains(&"component".to_string()));
        }
    }

    #[test]
    fn no_duplicate_tags() {
        for name in ["button", "modal", "pagination"] {
            let tags = tags_for(name);
            let mut dedup = tags.clone();
            dedup.dedup();
            assert_eq!(tags.len(), dedup.len());
        }
    }
}
