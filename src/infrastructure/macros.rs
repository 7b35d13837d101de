//! Declarative generation of trait doubles.

/// Generate a double for a trait.
///
/// The generated struct wraps a [`Double`](crate::Double) over
/// `dyn Trait + Send + Sync` and implements the trait by routing each listed
/// method through it. Each method names the default a mock returns when the
/// call is unstubbed (`=> expr`). The return type may be left out for methods
/// returning `()`.
///
/// Argument types must be `Clone + Debug + PartialEq + Send + Sync + 'static`,
/// and the trait must be in scope by its bare name.
///
/// # Example
/// ```
/// use test_doubles::{double, when};
///
/// pub trait Store {
///     fn put(&self, key: String, value: u64);
///     fn get(&self, key: String) -> Option<u64>;
/// }
///
/// double! {
///     /// Double for [`Store`].
///     pub struct StoreDouble for Store {
///         fn put(&self, key: String, value: u64) => ();
///         fn get(&self, key: String) -> Option<u64> => None;
///     }
/// }
///
/// let store = StoreDouble::mock();
/// store.put("a".to_string(), 1);
/// assert_eq!(store.get("a".to_string()), None);
///
/// when(&store, |s| s.get("a".to_string())).unwrap().then_return(Some(1));
/// assert_eq!(store.get("a".to_string()), Some(1));
/// ```
#[macro_export]
macro_rules! double {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident for $trait_:ident {
            $(
                fn $method:ident(&self $(, $arg:ident : $ty:ty)*) $(-> $ret:ty)? => $default:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        $vis struct $name {
            inner: $crate::Double<dyn $trait_ + Send + Sync>,
        }

        #[allow(dead_code)]
        impl $name {
            /// Create a mock named after the trait.
            pub fn mock() -> Self {
                Self::mock_named(::std::stringify!($trait_))
            }

            /// Create a mock with a diagnostic name.
            pub fn mock_named(name: impl ::std::convert::Into<::std::string::String>) -> Self {
                Self {
                    inner: $crate::Double::<dyn $trait_ + Send + Sync>::mock_named(name),
                }
            }

            /// Create a mock from settings.
            pub fn mock_with(
                settings: $crate::DoubleSettings,
            ) -> ::std::result::Result<Self, $crate::BuildError> {
                ::std::result::Result::Ok(Self {
                    inner: $crate::Double::<dyn $trait_ + Send + Sync>::mock_with(settings)?,
                })
            }

            /// Create a spy over `real`, named after the trait.
            pub fn spy<T>(real: T) -> Self
            where
                T: $trait_ + Send + Sync + 'static,
            {
                Self::spy_named(::std::stringify!($trait_), real)
            }

            /// Create a spy over `real` with a diagnostic name.
            pub fn spy_named<T>(name: impl ::std::convert::Into<::std::string::String>, real: T) -> Self
            where
                T: $trait_ + Send + Sync + 'static,
            {
                Self {
                    inner: $crate::Double::<dyn $trait_ + Send + Sync>::spy_named(
                        name,
                        ::std::boxed::Box::new(real),
                    ),
                }
            }

            /// Create a spy over `real` from settings.
            pub fn spy_with<T>(
                settings: $crate::DoubleSettings,
                real: T,
            ) -> ::std::result::Result<Self, $crate::BuildError>
            where
                T: $trait_ + Send + Sync + 'static,
            {
                ::std::result::Result::Ok(Self {
                    inner: $crate::Double::<dyn $trait_ + Send + Sync>::spy_with(
                        settings,
                        ::std::boxed::Box::new(real),
                    )?,
                })
            }

            /// The underlying double.
            pub fn double(&self) -> &$crate::Double<dyn $trait_ + Send + Sync> {
                &self.inner
            }
        }

        impl $crate::AsDouble for $name {
            type Storage = $crate::StubStorage;

            fn interceptor(&self) -> &$crate::Interceptor<$crate::StubStorage> {
                $crate::AsDouble::interceptor(&self.inner)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Debug::fmt(&self.inner, f)
            }
        }

        impl $trait_ for $name {
            $(
                fn $method(&self $(, $arg: $ty)*) $(-> $ret)? {
                    self.inner.invoke(
                        $crate::Invocation::new(
                            ::std::stringify!($method),
                            ::std::vec![$($crate::ArgValue::new(::std::clone::Clone::clone(&$arg))),*],
                        ),
                        || $default,
                        |real| real.$method($($arg),*),
                    )
                }
            )*
        }
    };
}
