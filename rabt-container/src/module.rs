//! Binding modules: groups of related bindings.
//!
//! A host typically maps its bindings in one place per concern:
//!
//! ```rust,ignore
//! struct GarageModule;
//!
//! impl BindingModule for GarageModule {
//!     fn configure(&self, binder: &InjectionBinder) -> Result<()> {
//!         binder.bind::<i32>().named("power").as_value(300)?;
//!         binder.bind::<dyn Vehicle>().to::<Car>()?;
//!         Ok(())
//!     }
//! }
//!
//! binder.install(&GarageModule)?;
//! ```

use crate::binder::InjectionBinder;
use crate::error::Result;

/// A set of bindings installed together.
pub trait BindingModule: Send + Sync {
    /// Adds this module's bindings to `binder`.
    fn configure(&self, binder: &InjectionBinder) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RabtError;
    use crate::settings::BinderSettings;

    struct Wheels;

    impl BindingModule for Wheels {
        fn configure(&self, binder: &InjectionBinder) -> Result<()> {
            binder.bind::<u8>().named("count").as_value(4u8)?;
            binder.bind::<String>().named("brand").as_value(String::from("Pirelli"))?;
            Ok(())
        }
    }

    #[test]
    fn module_binds_everything() {
        let binder = InjectionBinder::new();
        binder.install(&Wheels).unwrap();

        assert_eq!(*binder.get_instance_named::<u8>("count").unwrap(), 4);
        assert_eq!(
            binder.get_instance_named::<String>("brand").unwrap().as_str(),
            "Pirelli"
        );
    }

    #[test]
    fn module_has_name() {
        assert!(Wheels.name().contains("Wheels"));
    }

    #[test]
    fn module_errors_propagate() {
        let binder = InjectionBinder::with_settings(BinderSettings::default().reject_conflicts(true));
        binder.install(&Wheels).unwrap();

        match binder.install(&Wheels) {
            Err(RabtError::ConflictingBinding(e)) => {
                assert!(e.key.type_name().contains("u8"));
            }
            other => panic!("Expected ConflictingBinding, got: {other:?}"),
        }
    }
}
