macro_rules! from_val_to_enum {
    ($ob:ident $to:ident $($t:ty)*) => ($(
        impl From<$t> for $ob {
            fn from(value: $t) -> Self {
                Self::$to(value)
            }
        }
    )*)
}

macro_rules! from_val_to_enum_into {
    ($ob:ident $to:ident $($t:ty)*) => ($(
        impl From<$t> for $ob {
            fn from(value: $t) -> Self {
                Self::$to(value.into())
            }
        }
    )*)
}

// Operators travel as plain strings. Anything unrecognized lands in `Unknown`
// and keeps its original text so a catalogue round-trips unchanged.
macro_rules! operator_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
            /// An operator this SDK version does not know. Never matches.
            Unknown(String),
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($text => Self::$variant,)*
                    _ => Self::Unknown(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $text.to_owned(),)*
                    $name::Unknown(text) => text,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => f.write_str($text),)*
                    $name::Unknown(text) => f.write_str(text),
                }
            }
        }
    };
}
