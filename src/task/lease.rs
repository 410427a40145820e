//! Lease slot of a task file.

use super::TaskFile;
use crate::lease::{Leasable, Semaphore};

impl Leasable for TaskFile {
    fn lease_id(&self) -> &str {
        &self.frontmatter.id
    }

    fn semaphore(&self) -> Option<&Semaphore> {
        self.frontmatter.semaphore.as_ref()
    }

    fn semaphore_mut(&mut self) -> Option<&mut Semaphore> {
        self.frontmatter.semaphore.as_mut()
    }

    fn set_semaphore(&mut self, semaphore: Option<Semaphore>) {
        self.frontmatter.semaphore = semaphore;
    }
}
