pub mod site_handler;
