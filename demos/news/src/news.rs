//! The news content type.

use djinn_contenttypes::forms::{ContentForm, FieldDef};
use djinn_contenttypes::registry::ContentTypeEntry;
use djinn_contenttypes::views::ContentTypeOptions;

pub const APP: &str = "djinn_news";
pub const CT: &str = "news";

/// Registry entry used when the settings do not configure `news`.
pub fn default_entry() -> ContentTypeEntry {
    ContentTypeEntry::new()
        .with("app", APP)
        .with("label", "News")
        .with("name_plural", "News items")
        .with("global_add", true)
        .with("create_tmp_object", true)
        .with("add_permission", "djinn_news.add_news")
}

pub fn form() -> ContentForm {
    ContentForm::new(vec![
        FieldDef::char("title", 200).label("Title"),
        FieldDef::text("body").optional().label("Text"),
        FieldDef::slug("slug").optional(),
        FieldDef::datetime("publish_from").optional().label("Publish from"),
        FieldDef::datetime("publish_to").optional().label("Publish until"),
    ])
}

pub fn options() -> ContentTypeOptions {
    ContentTypeOptions::new(APP, CT, form())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry() {
        let entry = default_entry();
        assert_eq!(entry.app(), Some(APP));
        assert!(entry.create_tmp_object());
    }

    #[test]
    fn test_url_names() {
        assert_eq!(options().url_name("add"), "djinn_news_add_news");
    }
}
