#![warn(clippy::pedantic)]

extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemFn, Stmt, parse::Parse, parse_macro_input, parse_quote};

#[derive(PartialEq, Eq, Clone, Copy, Default)]
enum Precision {
    #[default]
    Nanos,
    Micros,
    Millis,
    Seconds,
}

impl Precision {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ns" | "nano" | "nanos" | "nanoseconds" => Some(Self::Nanos),
            "us" | "micro" | "micros" | "microseconds" => Some(Self::Micros),
            "ms" | "milli" | "millis" | "milliseconds" => Some(Self::Millis),
            "s" | "sec" | "secs" | "seconds" => Some(Self::Seconds),
            _ => None,
        }
    }

    /// Expression rendering the elapsed `Duration` bound to `elapsed`
    fn render(self) -> syn::Expr {
        match self {
            Self::Nanos => parse_quote!(format!("{} ns elapsed", elapsed.as_nanos())),
            Self::Micros => parse_quote!(format!("{} us elapsed", elapsed.as_micros())),
            Self::Millis => parse_quote!(format!("{} ms elapsed", elapsed.as_millis())),
            Self::Seconds => parse_quote!(format!("{:.3} s elapsed", elapsed.as_secs_f64())),
        }
    }
}

mod keywords {
    syn::custom_keyword!(timing);
    syn::custom_keyword!(precision);
    syn::custom_keyword!(instrument);
}

#[derive(Default)]
struct Attributes {
    timing: Option<Precision>,
    instrument: Option<TokenStream>,
}

impl Attributes {
    fn parse_timing(input: syn::parse::ParseStream) -> syn::Result<Precision> {
        if !input.peek(syn::token::Paren) {
            return Ok(Precision::default());
        }

        let content;
        let _ = syn::parenthesized!(content in input);
        let _ = content.parse::<keywords::precision>()?;
        let _ = content.parse::<syn::Token![=]>()?;
        let literal = content.parse::<syn::LitStr>()?;

        Precision::from_name(&literal.value()).ok_or_else(|| {
            syn::Error::new(
                literal.span(),
                "unknown precision, expected one of `ns`, `us`, `ms` or `s`",
            )
        })
    }
}

impl Parse for Attributes {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut attributes = Self::default();

        while !input.is_empty() {
            let lookahead = input.lookahead1();
            if lookahead.peek(keywords::timing) {
                if attributes.timing.is_some() {
                    return Err(input.error("expected only a single `timing` argument"));
                }
                let _ = input.parse::<keywords::timing>()?;
                attributes.timing = Some(Self::parse_timing(input)?);
            } else if lookahead.peek(keywords::instrument) {
                if attributes.instrument.is_some() {
                    return Err(input.error("expected only a single `instrument` argument"));
                }
                let _ = input.parse::<keywords::instrument>()?;
                let fields = if input.peek(syn::token::Paren) {
                    let content;
                    let _ = syn::parenthesized!(content in input);
                    content.parse()?
                } else {
                    TokenStream::new()
                };
                attributes.instrument = Some(fields);
            } else if lookahead.peek(syn::Token![,]) {
                let _ = input.parse::<syn::Token![,]>()?;
            } else {
                return Err(lookahead.error());
            }
        }

        Ok(attributes)
    }
}

/// Emits `tracing::trace!` events when the attributed function is entered and
/// when it returns (or its future is dropped).
///
/// ```ignore
/// #[traced(instrument(level = tracing::Level::DEBUG, skip_all), timing(precision = "ms"))]
/// async fn broadcast(&self) { ... }
/// ```
///
/// `instrument(...)` forwards its arguments to `#[tracing::instrument]`, and
/// `timing` appends the elapsed wall-clock time to the exit event.
#[proc_macro_attribute]
pub fn traced(
    args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = parse_macro_input!(args as Attributes);
    let mut item_fn = parse_macro_input!(item as ItemFn);

    item_fn
        .attrs
        .push(parse_quote! { #[allow(clippy::items_after_statements)] });

    if let Some(fields) = args.instrument {
        item_fn
            .attrs
            .push(parse_quote! { #[tracing::instrument(#fields)] });
    }

    let id = item_fn.sig.ident.to_string();
    let on_exit: Stmt = match args.timing {
        Some(precision) => {
            let render = precision.render();
            parse_quote! {
                {
                    let elapsed = self.started.elapsed();
                    ::tracing::trace!("OnExit: {} ({})", #id, #render);
                }
            }
        }
        None => parse_quote! { ::tracing::trace!("OnExit: {}", #id); },
    };

    let prologue: Vec<Stmt> = parse_quote! {
        #[allow(dead_code)]
        struct __Traced {
            started: ::std::time::Instant,
        }

        impl ::std::ops::Drop for __Traced {
            fn drop(&mut self) {
                #on_exit
            }
        }

        ::tracing::trace!("OnEnter: {}", #id);
        let __traced = __Traced {
            started: ::std::time::Instant::now(),
        };
    };

    for stmt in prologue.into_iter().rev() {
        item_fn.block.stmts.insert(0, stmt);
    }

    proc_macro::TokenStream::from(quote! { #item_fn })
}
