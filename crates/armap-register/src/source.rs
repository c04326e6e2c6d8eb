use std::future::Future;

use armap_core::ArDetail;

use crate::error::RegisterError;

/// Something that can list a firm's appointed representatives by FRN.
pub trait RegisterSource: Send + Sync {
    fn appointed_representatives(
        &self,
        frn: &str,
    ) -> impl Future<Output = Result<Vec<ArDetail>, RegisterError>> + Send;
}
