//! Chain-of-responsibility validation.
//!
//! A [`Chain`] is an ordered list of [`Check`] links. Each link first says
//! whether it applies to the context; applicable links run in order and the
//! first failure stops the chain with that link's own [`Rejection`]. Links
//! after a failure never run.
//!
//! The same runner backs both pipelines:
//!
//! - [`assignment`]: may a developer take a ticket?
//! - [`comment`]: may a user comment on a ticket?

use tracing::trace;

use crate::error::Rejection;

pub mod assignment;
pub mod comment;

/// One link of a validation chain.
pub trait Check<C: ?Sized> {
    /// Short identifier used in trace logs.
    fn name(&self) -> &'static str;

    /// Whether this link participates for the given context.
    fn applies_to(&self, _ctx: &C) -> bool {
        true
    }

    /// Evaluate the link.
    ///
    /// # Errors
    ///
    /// Returns the link's rejection when the condition does not hold.
    fn check(&self, ctx: &C) -> Result<(), Rejection>;
}

/// An ordered sequence of [`Check`] links.
pub struct Chain<C: ?Sized> {
    links: Vec<Box<dyn Check<C>>>,
}

impl<C: ?Sized> Default for Chain<C> {
    fn default() -> Self {
        Self { links: Vec::new() }
    }
}

impl<C: ?Sized> Chain<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a link at the end of the chain.
    #[must_use]
    pub fn with(mut self, link: impl Check<C> + 'static) -> Self {
        self.links.push(Box::new(link));
        self
    }

    /// Run every applicable link in order.
    ///
    /// # Errors
    ///
    /// Returns the rejection of the first applicable link that fails.
    pub fn validate(&self, ctx: &C) -> Result<(), Rejection> {
        for link in &self.links {
            if !link.applies_to(ctx) {
                trace!(link = link.name(), "check skipped");
                continue;
            }
            link.check(ctx)?;
        }
        Ok(())
    }

    /// Link names in evaluation order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.links.iter().map(|link| link.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
