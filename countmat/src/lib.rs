#[cfg(feature = "core")]
#[doc(inline)]
pub use countmat_core as core;

#[cfg(feature = "io")]
#[doc(inline)]
pub use countmat_io as io;
