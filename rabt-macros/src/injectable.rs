//! `#[injectable]` implementation.

use darling::ast::NestedMeta;
use darling::{Error, FromMeta, Result};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta, Path,
    PathArguments, ReturnType, Type, Visibility,
};

#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct InjectableArgs {
    #[darling(rename = "crate")]
    krate: Option<Path>,
}

#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct InjectArgs {
    name: Option<String>,
}

#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct PostConstructArgs {
    priority: i32,
}

/// How a constructor hands back `Self`.
#[derive(Clone, Copy)]
enum Returns {
    Value,
    Result,
}

pub fn expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let args = InjectableArgs::from_list(&NestedMeta::parse_meta_list(attr)?)?;
    let rabt = args.krate.unwrap_or_else(|| syn::parse_quote!(::rabt));

    let mut block: ItemImpl = syn::parse2(item)?;
    if let Some((_, path, _)) = &block.trait_ {
        return Err(Error::custom("#[injectable] goes on an inherent impl block").with_span(path));
    }

    let self_ty = block.self_ty.clone();
    let mut errors = Error::accumulator();
    let mut registrations = Vec::new();

    for item in &mut block.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let construct = take_attr(&mut method.attrs, "construct");
        let inject = take_attr(&mut method.attrs, "inject");
        let post_construct = take_attr(&mut method.attrs, "post_construct");

        let tags: Vec<&str> = [
            construct.as_ref().map(|_| "#[construct]"),
            inject.as_ref().map(|_| "#[inject]"),
            post_construct.as_ref().map(|_| "#[post_construct]"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if tags.len() > 1 {
            errors.push(
                Error::custom(format!("conflicting tags: {}", tags.join(" and ")))
                    .with_span(&method.sig),
            );
            continue;
        }

        let registration = if let Some(attr) = inject {
            errors.handle(setter(method, &attr))
        } else if let Some(attr) = post_construct {
            errors.handle(hook(method, &attr))
        } else if construct.is_some() || is_public_constructor(method, &self_ty) {
            errors.handle(constructor(&rabt, method, &self_ty, construct.is_some()))
        } else {
            None
        };
        registrations.extend(registration);
    }

    errors.finish()?;

    let (impl_generics, _, where_clause) = block.generics.split_for_impl();

    Ok(quote! {
        #block

        impl #impl_generics #rabt::Injectable for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn describe(descriptor: &mut #rabt::TypeDescriptor<Self>) {
                #(#registrations)*
            }
        }
    })
}

/// Removes the first attribute named `name` and returns it.
fn take_attr(attrs: &mut Vec<Attribute>, name: &str) -> Option<Attribute> {
    let index = attrs.iter().position(|attr| attr.path().is_ident(name))?;
    Some(attrs.remove(index))
}

/// Parses `#[tag]` or `#[tag(...)]`.
fn parse_args<T: FromMeta + Default>(attr: &Attribute) -> Result<T> {
    match &attr.meta {
        Meta::Path(_) => Ok(T::default()),
        Meta::List(list) => T::from_list(&NestedMeta::parse_meta_list(list.tokens.clone())?),
        Meta::NameValue(_) => Err(Error::unsupported_format("name-value").with_span(attr)),
    }
}

fn is_public(method: &ImplItemFn) -> bool {
    matches!(method.vis, Visibility::Public(_))
}

fn is_public_constructor(method: &ImplItemFn, self_ty: &Type) -> bool {
    is_public(method)
        && method.sig.receiver().is_none()
        && returns(&method.sig.output, self_ty).is_some()
}

fn is_self(ty: &Type, self_ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() && path.path.is_ident("Self") => true,
        _ => quote!(#ty).to_string() == quote!(#self_ty).to_string(),
    }
}

fn returns(output: &ReturnType, self_ty: &Type) -> Option<Returns> {
    let ReturnType::Type(_, ty) = output else {
        return None;
    };
    if is_self(ty, self_ty) {
        return Some(Returns::Value);
    }

    let Type::Path(path) = ty.as_ref() else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(generics) = &last.arguments else {
        return None;
    };
    match generics.args.first()? {
        GenericArgument::Type(ok) if is_self(ok, self_ty) => Some(Returns::Result),
        _ => None,
    }
}

fn constructor(
    rabt: &Path,
    method: &mut ImplItemFn,
    self_ty: &Type,
    designated: bool,
) -> Result<TokenStream> {
    let ident = method.sig.ident.clone();
    let name = ident.to_string();

    if method.sig.receiver().is_some() {
        return Err(Error::custom("a constructor cannot take self").with_span(&method.sig));
    }
    let Some(returns) = returns(&method.sig.output, self_ty) else {
        return Err(Error::custom("a constructor returns Self or Result<Self, E>")
            .with_span(&method.sig.output));
    };

    let mut params = Vec::new();
    let mut bindings = Vec::new();
    let mut arguments = Vec::new();

    for (index, input) in method.sig.inputs.iter_mut().enumerate() {
        let FnArg::Typed(arg) = input else {
            continue;
        };
        let ty = arg.ty.clone();
        let argument = format_ident!("arg{}", index);

        params.push(match take_attr(&mut arg.attrs, "named") {
            Some(attr) => {
                let qualifier: LitStr = attr.parse_args()?;
                quote!(.named_param::<#ty>(#qualifier))
            }
            None => quote!(.param::<#ty>()),
        });
        bindings.push(quote!(let #argument: #ty = args.next()?;));
        arguments.push(argument);
    }

    let designated = designated.then(|| quote!(.designated()));
    let body = match returns {
        Returns::Value => quote!(Ok(Self::#ident(#(#arguments),*))),
        Returns::Result => quote! {
            Self::#ident(#(#arguments),*)
                .map_err(|e| #rabt::RabtError::construction(::std::any::type_name::<Self>(), e))
        },
    };

    Ok(quote! {
        descriptor
            .constructor(#name)
            #(#params)*
            #designated
            .invoke(|args| {
                #(#bindings)*
                #body
            });
    })
}

fn setter(method: &ImplItemFn, attr: &Attribute) -> Result<TokenStream> {
    let args: InjectArgs = parse_args(attr)?;
    let ident = &method.sig.ident;
    let name = ident.to_string();

    let mut inputs = method.sig.inputs.iter();
    let mutable_receiver = matches!(
        inputs.next(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_some()
    );
    let ty = match (mutable_receiver, inputs.next(), inputs.next()) {
        (true, Some(FnArg::Typed(value)), None) => &value.ty,
        _ => {
            return Err(Error::custom("an #[inject] setter takes &mut self and one value")
                .with_span(&method.sig));
        }
    };

    let named = args.name.map(|qualifier| quote!(.named(#qualifier)));
    let non_public = (!is_public(method)).then(|| quote!(.non_public()));

    Ok(quote! {
        descriptor
            .setter(#name, |target: &mut Self, value: #ty| {
                target.#ident(value);
            })
            #named
            #non_public;
    })
}

fn hook(method: &ImplItemFn, attr: &Attribute) -> Result<TokenStream> {
    let args: PostConstructArgs = parse_args(attr)?;
    let ident = &method.sig.ident;
    let name = ident.to_string();

    let by_reference = method
        .sig
        .receiver()
        .is_some_and(|receiver| receiver.reference.is_some());
    if !by_reference || method.sig.inputs.len() != 1 {
        return Err(Error::custom("a #[post_construct] hook takes only &self or &mut self")
            .with_span(&method.sig));
    }

    let priority = args.priority;
    Ok(quote! {
        descriptor
            .post_construct(#name, |target: &mut Self| {
                target.#ident();
            })
            .priority(#priority);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_impl(item: TokenStream) -> Result<String> {
        expand(TokenStream::new(), item).map(|tokens| tokens.to_string())
    }

    #[test]
    fn registers_public_constructor_and_tags() {
        let output = expand_impl(quote! {
            impl Engine {
                pub fn new(#[named("power")] power: i32) -> Self {
                    Engine { power, fuel: 0 }
                }

                #[inject(name = "fuel")]
                pub fn set_fuel(&mut self, fuel: u32) {
                    self.fuel = fuel;
                }

                #[post_construct(priority = 2)]
                fn ignite(&mut self) {}
            }
        })
        .unwrap();

        assert!(output.contains("named_param :: < i32 > (\"power\")"), "{output}");
        assert!(output.contains("setter (\"set_fuel\""), "{output}");
        assert!(output.contains("post_construct (\"ignite\""), "{output}");
        assert!(!output.contains("# [named"), "{output}");
    }

    #[test]
    fn construct_with_inject_is_rejected() {
        let result = expand_impl(quote! {
            impl Engine {
                #[construct]
                #[inject]
                pub fn set(&mut self, power: i32) {}
            }
        });
        let message = result.unwrap_err().to_string();
        assert!(message.contains("conflicting tags"), "{message}");
        assert!(message.contains("#[construct] and #[inject]"), "{message}");
    }

    #[test]
    fn construct_with_post_construct_is_rejected() {
        let result = expand_impl(quote! {
            impl Engine {
                #[post_construct]
                #[construct]
                pub fn new() -> Self {
                    Engine
                }
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn trait_impl_is_rejected() {
        let result = expand_impl(quote! {
            impl Default for Engine {
                fn default() -> Self {
                    Engine
                }
            }
        });
        assert!(result.is_err());
    }
}
