pub use std::collections::BTreeMap;

// Label or annotation maps: klabel!(APP_LABEL => "django", "tier" => "web")
#[macro_export]
macro_rules! klabel {
    ($($k:expr => $v:expr),+$(,)?) => {
        BTreeMap::from([$(($k.to_string(), $v.to_string())),+])
    };
}

pub use klabel;
