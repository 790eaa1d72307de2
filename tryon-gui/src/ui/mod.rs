mod canvas;
mod controls;
mod header;
