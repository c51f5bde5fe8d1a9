//! Declares port error enums together with what the user is told.
//!
//! Every variant names two texts: the `thiserror` message written to logs,
//! and the notice shown when the error ends a user action. Controllers turn
//! any port error into a [`Notice`](crate::domain::Notice) through the
//! generated `From` impl instead of matching on variants themselves.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum MentionEditorError {
//!         EditorNotFound => "post editor not found",
//!             notice: "Could not find post editor. Please open a new post first.",
//!     }
//! }
//! ```
//!
//! Each variant also gets a snake_case constructor taking `impl Into<T>`
//! for every field.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    => $message:literal, notice: $notice:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Build [`", stringify!($name), "::", stringify!($variant), "`].")]
                    pub fn [<$variant:snake>]( $( $($field: impl Into<$ty>),* )? ) -> Self {
                        Self::$variant $( { $($field: $field.into()),* } )?
                    }
                }
            )*

            /// Text shown to the user when this error ends an action.
            pub const fn user_message(&self) -> &'static str {
                match self {
                    $( Self::$variant { .. } => $notice, )*
                }
            }
        }

        impl From<&$name> for $crate::domain::Notice {
            fn from(error: &$name) -> Self {
                Self::error(error.user_message())
            }
        }
    };
}

pub(crate) use define_port_error;
