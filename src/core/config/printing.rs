use crate::core::config::data::Config;

impl Config {
    /// Render every key with its effective value.
    pub fn describe(&self) -> String {
        fn line(key: &str, value: Option<String>, fallback: &str) -> String {
            match value {
                Some(value) => format!("  {key}: {value}\n"),
                None => format!("  {key}: {fallback} (default)\n"),
            }
        }

        let mut out = String::from("Current configuration:\n");
        out.push_str(&line(
            "model-base-url",
            self.model_base_url.clone(),
            self.model_base_url(),
        ));
        out.push_str(&line(
            "store-base-url",
            self.store_base_url.clone(),
            self.store_base_url(),
        ));
        out.push_str(&line(
            "default-model",
            self.default_model.clone(),
            self.default_model(),
        ));
        out.push_str(&line(
            "store",
            self.store.map(|kind| kind.to_string()),
            &self.store_kind().to_string(),
        ));
        out
    }

    pub fn print_all(&self) {
        print!("{}", self.describe());
    }
}
