pub mod thumbnailer;
