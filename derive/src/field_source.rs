use super::utils;
use proc_macro2::TokenStream;
use quote::quote;

use syn::spanned::Spanned;
use syn::Error;
use syn::Result;

pub fn derive(input: syn::DeriveInput) -> Result<TokenStream> {
    let span = input.span();
    let fields = utils::parse_fields(input.data, span)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let struct_type = input.ident;

    let mut names = Vec::new();
    let mut idents = Vec::new();

    for field in fields {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(span, "cannot derive for structs with unnnamed fields"))?;
        let name = field.array_name(&ident);

        if names.iter().any(|other: &syn::LitStr| other.value() == name) {
            return Err(Error::new(span, format!("array `{name}` is named twice")));
        }

        // convert the field name to a string literal to match on
        names.push(syn::LitStr::new(&name, proc_macro2::Span::call_site()));
        idents.push(ident);
    }

    // declare the whole trait
    let expanded = quote! {
        impl #impl_generics ::vtk_xml::FieldSource for #struct_type #ty_generics #where_clause {
            fn field_metadata(&self, name: &str) -> Option<::vtk_xml::FieldMetaData> {
                match name {
                    #( #names => Some(::vtk_xml::FieldBuffer::meta_data(&self.#idents)), )*
                    _ => None,
                }
            }

            fn flush(
                &self,
                name: &str,
                sink: &mut ::vtk_xml::PayloadWriter,
            ) -> Result<(), ::vtk_xml::Error> {
                match name {
                    #( #names => ::vtk_xml::FieldBuffer::flush(&self.#idents, sink), )*
                    _ => Err(::vtk_xml::Error::FieldNotFound(name.into())),
                }
            }

            fn absorb(
                &mut self,
                name: &str,
                source: &mut ::vtk_xml::PayloadReader,
            ) -> Result<(), ::vtk_xml::Error> {
                match name {
                    #( #names => ::vtk_xml::FieldBuffer::absorb(&mut self.#idents, source), )*
                    _ => Err(::vtk_xml::Error::FieldNotFound(name.into())),
                }
            }
        }
    };

    // Hand the output tokens back to the compiler
    Ok(expanded)
}
