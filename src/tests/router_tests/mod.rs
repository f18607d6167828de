mod admin_tests;
mod items_tests;
