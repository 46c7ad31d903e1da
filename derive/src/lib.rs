mod field_source;
mod utils;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Implement `vtk_xml::FieldSource` for a struct whose fields are buffers.
///
/// Every named field must implement `vtk_xml::FieldBuffer`. The name of the
/// field is the name of the array in the file unless it is renamed with
/// `#[vtk(rename = "...")]`. Fields marked `#[vtk(skip)]` are ignored.
#[proc_macro_derive(FieldSource, attributes(vtk))]
pub fn derive_field_source(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let input = parse_macro_input!(input as DeriveInput);

    field_source::derive(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
