//! Small helper macros for working with [`crate::headers::Header`].

/// Filters an iterator of `&Header` down to the inner value of one variant.
#[macro_export]
macro_rules! filter_map_header {
    ($hdrs:expr, $header:ident) => {
        $hdrs.filter_map(|hdr| {
            if let $crate::headers::Header::$header(v) = hdr {
                Some(v)
            } else {
                None
            }
        })
    };
}

/// Finds the first header of one variant in an iterator of `&Header`.
#[macro_export]
macro_rules! find_map_header {
    ($hdrs:expr, $header:ident) => {
        $hdrs.find_map(|hdr| {
            if let $crate::headers::Header::$header(v) = hdr {
                Some(v)
            } else {
                None
            }
        })
    };
}
