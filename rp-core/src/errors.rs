//! Error plumbing shared by the road planner crates.
pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
#[doc(hidden)]
pub use paste;
pub use thiserror::Error;

/// Result of an operation that only reports success or failure.
pub type EmptyResult = anyhow::Result<()>;

/// Generates a `thiserror` enum together with snake_case constructors that return
/// `anyhow::Error`, so call sites can write `bail!(MyError::bad_input(...))` without boxing by
/// hand. `String` payloads accept anything `Display`. Doc comments on the enum and its variants
/// are passed through.
///
/// ```
/// rp_core::err_impl! {
///     /// Errors of the demo.
///     DemoError,
///     /// The input could not be used.
///     #[error("bad input: {0}")]
///     BadInput(String),
///     #[error("{0} items left over")]
///     LeftOver(usize),
/// }
///
/// let err = DemoError::bad_input("x");
/// assert_eq!(err.to_string(), "bad input: x");
/// assert!(matches!(DemoError::left_over(3).downcast_ref::<DemoError>(), Some(DemoError::LeftOver(3))));
/// ```
#[macro_export]
macro_rules! err_impl {
    (@hidden $errtype:ident, $item:ident, String) => {
        $crate::errors::paste::paste! {
            #[doc = "Wraps [`" $errtype "::" $item "`] into an [`anyhow::Error`]."]
            pub fn [<$item:snake>](in_: impl ::std::fmt::Display) -> ::anyhow::Error {
                ::anyhow::Error::new($errtype::$item(in_.to_string()))
            }
        }
    };

    (@hidden $errtype:ident, $item:ident, $($dtype:tt)*) => {
        $crate::errors::paste::paste! {
            #[doc = "Wraps [`" $errtype "::" $item "`] into an [`anyhow::Error`]."]
            pub fn [<$item:snake>](in_: $($dtype)*) -> ::anyhow::Error {
                ::anyhow::Error::new($errtype::$item(in_))
            }
        }
    };

    ($(#[$outer:meta])* $errtype:ident,
        $($(#[$errinfo:meta])* $item:ident($($dtype:tt)*),)+
    ) => {
        $(#[$outer])*
        #[derive(Debug, $crate::errors::Error)]
        pub enum $errtype {
            $($(#[$errinfo])* $item($($dtype)*)),+
        }

        impl $errtype {
            $($crate::err_impl! {@hidden $errtype, $item, $($dtype)*})+
        }
    };
}
