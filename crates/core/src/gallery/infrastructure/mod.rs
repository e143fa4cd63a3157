pub mod http_gallery_client;
