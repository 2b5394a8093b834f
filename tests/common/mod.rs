pub mod test_clients;
