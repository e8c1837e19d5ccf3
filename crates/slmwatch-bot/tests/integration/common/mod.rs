pub mod mock_kite;
