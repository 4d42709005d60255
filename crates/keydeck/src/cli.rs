use clap::{Parser, Subcommand, ValueEnum};
use keydeck_core::{KeyFilter, KeyType, SortKey};

/// Browse and edit the keys of a Redis admin service.
#[derive(Parser, Debug)]
#[command(name = "keydeck", version, about)]
pub struct Cli {
    /// Base URL of the admin service; overrides the config file.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Rows per page; overrides the config file.
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List keys, one page at a time.
    Keys {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,

        #[arg(long, value_enum, default_value_t = SortArg::Key)]
        sort: SortArg,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Print the table markup instead of plain text.
        #[arg(long)]
        html: bool,
    },

    /// Narrow the listing to keys matching a glob pattern.
    Search { pattern: String },

    /// Show one key's value.
    View {
        key: String,

        #[arg(long)]
        html: bool,
    },

    /// Print a key's editable text, or replace its value with `--value`.
    Edit {
        key: String,

        #[arg(long)]
        value: Option<String>,

        /// Seconds until expiry; -1 keeps the key forever.
        #[arg(long, allow_negative_numbers = true)]
        ttl: Option<i64>,
    },

    /// Create or overwrite a key.
    Set {
        key: String,

        #[arg(long = "type", value_enum)]
        key_type: TypeArg,

        #[arg(long)]
        value: String,

        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        ttl: i64,
    },

    Delete {
        key: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Delete every key in the current database.
    Flush {
        #[arg(long)]
        yes: bool,
    },

    /// Check that the admin service can reach the store.
    Ping,

    /// Show server statistics.
    Stats {
        /// Keep polling at the configured refresh interval.
        #[arg(long)]
        watch: bool,
    },

    /// Show or change the color theme.
    Theme {
        #[arg(value_enum)]
        choice: Option<ThemeChoice>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    String,
    Hash,
    List,
    Set,
    #[value(name = "zset")]
    ZSet,
}

impl From<TypeArg> for KeyType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::String => KeyType::String,
            TypeArg::Hash => KeyType::Hash,
            TypeArg::List => KeyType::List,
            TypeArg::Set => KeyType::Set,
            TypeArg::ZSet => KeyType::ZSet,
        }
    }
}

/// `all` or a single key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    All,
    String,
    Hash,
    List,
    Set,
    #[value(name = "zset")]
    ZSet,
}

impl From<FilterArg> for KeyFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => KeyFilter::All,
            FilterArg::String => KeyFilter::Type(KeyType::String),
            FilterArg::Hash => KeyFilter::Type(KeyType::Hash),
            FilterArg::List => KeyFilter::Type(KeyType::List),
            FilterArg::Set => KeyFilter::Type(KeyType::Set),
            FilterArg::ZSet => KeyFilter::Type(KeyType::ZSet),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Key,
    Type,
    Size,
    Ttl,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Key => SortKey::Key,
            SortArg::Type => SortKey::Type,
            SortArg::Size => SortKey::Size,
            SortArg::Ttl => SortKey::Ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_options() {
        let cli = Cli::try_parse_from([
            "keydeck", "--url", "http://h:1", "keys", "--filter", "hash", "--sort", "ttl",
            "--page", "3",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://h:1"));
        match cli.command {
            Command::Keys {
                filter,
                sort,
                page,
                html,
            } => {
                assert_eq!(KeyFilter::from(filter), KeyFilter::Type(KeyType::Hash));
                assert_eq!(SortKey::from(sort), SortKey::Ttl);
                assert_eq!(page, 3);
                assert!(!html);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn set_accepts_negative_ttl() {
        let cli = Cli::try_parse_from([
            "keydeck", "set", "k", "--type", "zset", "--value", "[1]", "--ttl", "-1",
        ])
        .unwrap();

        match cli.command {
            Command::Set { key_type, ttl, .. } => {
                assert_eq!(KeyType::from(key_type), KeyType::ZSet);
                assert_eq!(ttl, -1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn keys_defaults_and_typos() {
        let cli = Cli::try_parse_from(["keydeck", "keys"]).unwrap();
        assert_eq!(cli.page_size, None);
        match cli.command {
            Command::Keys { filter, sort, page, .. } => {
                assert_eq!(KeyFilter::from(filter), KeyFilter::All);
                assert_eq!(SortKey::from(sort), SortKey::Key);
                assert_eq!(page, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["keydeck", "keys", "--sort", "sizes"]).is_err());
        assert!(Cli::try_parse_from(["keydeck", "keys", "--filter", "stream"]).is_err());
        let bad_type = ["keydeck", "set", "k", "--type", "z-set", "--value", "[]"];
        assert!(Cli::try_parse_from(bad_type).is_err());
    }

    #[test]
    fn page_size_is_global() {
        let cli = Cli::try_parse_from(["keydeck", "keys", "--page-size", "20"]).unwrap();
        assert_eq!(cli.page_size, Some(20));
    }

    #[test]
    fn theme_choice_is_optional() {
        let cli = Cli::try_parse_from(["keydeck", "theme"]).unwrap();
        assert!(matches!(cli.command, Command::Theme { choice: None }));

        let cli = Cli::try_parse_from(["keydeck", "theme", "toggle"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Theme {
                choice: Some(ThemeChoice::Toggle)
            }
        ));
    }
}
