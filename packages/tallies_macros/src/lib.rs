#![allow(
    missing_docs,
    reason = "Private API, public API is documented in `tallies` package"
)]

use proc_macro::TokenStream;
use tallies_macros_impl::Instrumentation;

#[proc_macro]
pub fn stats(input: TokenStream) -> TokenStream {
    let instrumentation = if cfg!(feature = "enabled") {
        Instrumentation::Enabled
    } else {
        Instrumentation::Disabled
    };

    tallies_macros_impl::entrypoint(&input.into(), &instrumentation).into()
}
