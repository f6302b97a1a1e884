pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
pub use paste::paste;
pub use thiserror::Error;

pub type EmptyResult = anyhow::Result<()>;

// Only frames from these crates are interesting when something blows up; everything else is
// tokio/hyper/std plumbing
pub const OWN_CRATE_PREFIXES: [&str; 2] = ["ocp_core", "ocp_populate"];

// This macro creates an enum which derives from thiserror::Error, and also
// creates constructor functions in snake case for each of the enum variants
#[macro_export]
macro_rules! err_impl {
    (@hidden $errtype:ident, $item:ident, String) => {
        paste! {
            pub fn [<$item:snake>](in_: &str) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.into())}
            }
        }
    };

    (@hidden $errtype:ident, $item:ident, $($dtype:tt)::+) => {
        paste! {
            pub fn [<$item:snake>](in_: &$($dtype)::+) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.clone())}
            }
        }
    };

    ($errtype:ident,
        $(#[$errinfo:meta] $item:ident($($dtype:tt)::+),)+
    ) => {
        #[derive(Debug, Error)]
        pub enum $errtype {
            $(#[$errinfo] $item($($dtype)::+)),+
        }

        impl $errtype {
            $(err_impl! {@hidden $errtype, $item, $($dtype)::+})+
        }
    };
}

// Log a fatal error with its full context chain, plus whatever part of the backtrace (if one was
// captured, i.e., RUST_BACKTRACE is set) points into our own code.
#[macro_export]
macro_rules! logerr {
    (@hidden $err:ident, $msg:literal, $($args:expr),*) => {
        let bt = $err.backtrace().to_string();
        let frames: Vec<_> = bt
            .lines()
            .filter(|line| OWN_CRATE_PREFIXES.iter().any(|p| line.contains(p)))
            .map(|line| line.trim())
            .collect();

        if frames.is_empty() {
            error!(concat!($msg, ": {:#}") $(, $args)*, $err);
        } else {
            error!(concat!($msg, ": {:#}\n\nPartial Stack Trace:\n\n{}\n") $(, $args)*, $err, frames.join("\n"));
        }
    };

    ($err:ident, $msg:literal) => {
        logerr! {@hidden $err, $msg, };
    };

    ($err:ident, $msg:literal, $($args:expr),*) => {
        logerr! {@hidden $err, $msg, $($args),*};
    };
}

pub use {
    err_impl,
    logerr,
};
