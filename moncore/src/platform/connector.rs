#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ConnectorOption {
    #[cfg_attr(feature = "clap", clap(
        long = "auto-create-db",
        env = "MON_AUTO_CREATE_DB",
        action = clap::ArgAction::Set,
        default_value_t = true,
        default_missing_value = "true",
    ))]
    pub auto_create_db: bool,
    #[cfg_attr(feature = "clap", clap(
        long = "db-url",
        value_name = "MONTQS_DB_URL",
        env = "MONTQS_DB_URL",
    ))]
    pub url: String,
}

impl ConnectorOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_create_db(mut self, auto_create_db: bool) -> Self {
        self.auto_create_db = auto_create_db;
        self
    }

    pub fn url(mut self, url: String) -> Self {
        self.url = url;
        self
    }
}

impl<T> From<T> for ConnectorOption
where
    T: ToString
{
    fn from(v: T) -> Self {
        Self::new().url(v.to_string())
    }
}
