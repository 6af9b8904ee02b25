//! # Response Variants
//!
//! One declared outcome of a route: a configuration step over a response in
//! progress plus the type of body that will be attached to it.
//!
//! - **Configurable** variants run an arbitrary closure (set status,
//!   headers, ...) after the body has been encoded.
//! - **Canned** variants replace the response with a fixed, pre-built value;
//!   any body supplied at encode time is discarded.
//!
//! Configuration steps must be deterministic and touch nothing but the
//! response they are given: discovery runs them against a blank response to
//! learn a variant's status and content type.

use crate::body::{BodyType, IntoBody};
use crate::response::Response;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type ConfigureFn = dyn Fn(&mut Response) + Send + Sync;

#[derive(Clone)]
enum Step {
    Configure(Arc<ConfigureFn>),
    Canned(Response),
}

/// A declared response outcome with body type `T`
pub struct ResponseVariant<T: IntoBody> {
    step: Step,
    _body: PhantomData<fn() -> T>,
}

impl<T: IntoBody> ResponseVariant<T> {
    /// Configurable variant running `configure` over the encoded response
    pub fn new<F>(configure: F) -> Self
    where
        F: Fn(&mut Response) + Send + Sync + 'static,
    {
        Self {
            step: Step::Configure(Arc::new(configure)),
            _body: PhantomData,
        }
    }

    /// Configurable variant that only sets the status code
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::new(move |res| res.set_status(status))
    }

    /// Canned variant emitting `response` verbatim
    #[must_use]
    pub const fn canned(response: Response) -> Self {
        Self {
            step: Step::Canned(response),
            _body: PhantomData,
        }
    }

    /// Apply this variant's configuration step
    pub fn configure(&self, response: &mut Response) {
        match &self.step {
            Step::Configure(configure) => configure(response),
            Step::Canned(canned) => *response = canned.clone(),
        }
    }

    /// Whether the body supplied at encode time is ignored
    #[must_use]
    pub const fn is_canned(&self) -> bool {
        matches!(self.step, Step::Canned(_))
    }

    /// Body type tag
    #[must_use]
    pub fn body_type(&self) -> BodyType {
        BodyType::of::<T>()
    }
}

impl<T: IntoBody> Clone for ResponseVariant<T> {
    fn clone(&self) -> Self {
        Self {
            step: self.step.clone(),
            _body: PhantomData,
        }
    }
}

impl<T: IntoBody> fmt::Debug for ResponseVariant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseVariant")
            .field("canned", &self.is_canned())
            .field("body_type", &self.body_type().name)
            .finish()
    }
}

/// Metadata derived from a response variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantInfo {
    /// Status code the variant produces
    pub status: u16,
    /// Content type the variant produces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Body type tag
    pub body_type: BodyType,
}

/// Capability of presenting response-variant metadata
pub trait VariantDescriptor: Send + Sync {
    /// Run the configuration step against a blank response and read back
    /// status and content type
    fn info(&self) -> VariantInfo;
}

impl<T: IntoBody> VariantDescriptor for ResponseVariant<T> {
    fn info(&self) -> VariantInfo {
        let mut probe = Response::default();
        self.configure(&mut probe);
        let body_type = self.body_type();

        // Configurable variants keep the content type their body would set
        // unless the step overrode it.
        let content_type = match probe.content_type() {
            Some(ct) => Some(ct.to_string()),
            None if !self.is_canned() => body_type.content_type.map(str::to_string),
            None => None,
        };

        VariantInfo {
            status: probe.status,
            content_type,
            body_type,
        }
    }
}
