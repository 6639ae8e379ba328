mod message_tests;
mod schema_tests;
