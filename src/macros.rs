//! Terse macros for everyday usage

/// Build a placeholder map for [`crate::tmpl::Template::render`] and friends.
///
/// ```
/// let values = oscmd::placeholders! { "filename" => "'a b.txt'" };
/// assert_eq!(oscmd::tmpl::resolve_placeholders("open {{filename}}", &values).unwrap(), "open 'a b.txt'");
/// ```
#[macro_export]
macro_rules! placeholders {
    ( $( $k:expr => $v:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut __m = ::std::collections::BTreeMap::<::std::string::String, ::std::string::String>::new();
        $( __m.insert(::std::string::String::from($k), ::std::string::String::from($v)); )*
        __m
    }};
}
