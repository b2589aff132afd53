pub mod discovery;
pub mod export;
pub mod naming;
pub mod policy;
pub mod probe;
pub mod record;
pub mod selection;

#[cfg(test)]
pub(crate) mod test_support;
