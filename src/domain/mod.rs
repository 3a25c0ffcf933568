pub mod auth;
pub mod task;

#[cfg(test)]
mod test_util;
