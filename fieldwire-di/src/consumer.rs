//! Identity of an object consuming injected dependencies. [Consumer] is what a
//! [LookupPolicy](crate::lookup_policy::LookupPolicy) finder gets to decide which registry should
//! serve a given injection point. While the consumer is still being constructed, only its type is
//! known; once it exists, the instance itself is available too.

use std::any::{type_name, Any, TypeId};

#[derive(Copy, Clone, Debug)]
pub struct Consumer<'a> {
    type_id: TypeId,
    type_name: &'static str,
    instance: Option<&'a dyn Any>,
}

impl<'a> Consumer<'a> {
    /// Identity of an existing consumer instance.
    pub fn of<C: Any>(instance: &'a C) -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            instance: Some(instance),
        }
    }

    /// Identity of a consumer type, used before an instance exists.
    pub fn of_type<C: Any>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            instance: None,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn instance(&self) -> Option<&'a dyn Any> {
        self.instance
    }

    #[inline]
    pub fn is<C: Any>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    /// Returns the consumer instance as a concrete type, if both available and matching.
    pub fn downcast_ref<C: Any>(&self) -> Option<&'a C> {
        self.instance.and_then(|instance| instance.downcast_ref())
    }

    /// Address of the consumer instance. Two consumers with the same address are the same object.
    pub fn address(&self) -> Option<usize> {
        self.instance
            .map(|instance| instance as *const dyn Any as *const () as usize)
    }
}
