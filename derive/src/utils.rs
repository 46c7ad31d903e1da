use darling::FromField;
use syn::spanned::Spanned;
use syn::Error;
use syn::Result;

use proc_macro2::Span;

/// A named field of the struct and its `#[vtk(...)]` options
#[derive(FromField)]
#[darling(attributes(vtk))]
pub(crate) struct SourceField {
    pub(crate) ident: Option<syn::Ident>,
    /// name of the array in the file, defaults to the field name
    #[darling(default)]
    pub(crate) rename: Option<String>,
    #[darling(default)]
    pub(crate) skip: bool,
}

impl SourceField {
    pub(crate) fn array_name(&self, ident: &syn::Ident) -> String {
        match &self.rename {
            Some(rename) => rename.clone(),
            None => ident.to_string(),
        }
    }
}

pub(crate) fn parse_fields(input_data: syn::Data, span: Span) -> Result<Vec<SourceField>> {
    match input_data {
        syn::Data::Struct(data) => {
            match data.fields {
                syn::Fields::Named(fields) => {
                    let mut out_fields = vec![];

                    // we dont use iterators here so that we can early escape with `?`
                    for field in fields.named {
                        let parsed = SourceField::from_field(&field)
                            .map_err(|e| Error::new(field.span(), e.to_string()))?;

                        if !parsed.skip {
                            out_fields.push(parsed)
                        }
                    }

                    Ok(out_fields)
                }
                syn::Fields::Unnamed(_) => {
                    // error: dont accept unnnamed fields
                    Err(Error::new(
                        span,
                        "cannot derive for structs with unnnamed fields",
                    ))
                }
                syn::Fields::Unit => {
                    // dont accept unit structs
                    Err(Error::new(span, "cannot derive for unit structs"))
                }
            }
        }
        syn::Data::Enum(_) => Err(Error::new(span, "can only derive for structs")),
        syn::Data::Union(_) => Err(Error::new(span, "can only derive for structs")),
    }
}
