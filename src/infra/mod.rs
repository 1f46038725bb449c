pub mod documents;
pub mod openai;

#[cfg(test)]
pub mod testing;
