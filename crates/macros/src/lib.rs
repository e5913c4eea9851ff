use proc_macro::TokenStream;
use quote::quote;

#[derive(deluxe::ParseMetaItem)]
#[deluxe(attributes(similarity_metric))]
struct MetricAttributes(syn::Ident, #[deluxe(flatten)] MetricNamedAttributes);

#[derive(deluxe::ParseMetaItem)]
struct MetricNamedAttributes {
  name: String,
}

/// Wraps a `fn similarity(&self, lhs: &str, rhs: &str) -> f64` body into a
/// unit struct implementing `Metric` under the given name.
#[proc_macro_attribute]
pub fn similarity_metric(attrs: TokenStream, input: TokenStream) -> TokenStream {
  let MetricAttributes(ident, MetricNamedAttributes { name }) = match deluxe::parse2::<MetricAttributes>(attrs.into()) {
    Ok(attrs) => attrs,
    Err(err) => return err.to_compile_error().into(),
  };

  let input = proc_macro2::TokenStream::from(input);

  quote! {
      #[derive(Clone, Copy, Debug, Default)]
      pub struct #ident;

      impl Metric for #ident {
        fn name(&self) -> &'static str {
            #name
        }

        #[tracing::instrument(level = "trace", name = #name, skip_all)]
        #input
      }
  }
  .into()
}
