// Renderers over the shared layout plan: the screen preview frame and the
// single-page PDF, plus the resources they wait on (fonts, QR codes, images).

pub mod canvas;
pub mod export;
pub mod fonts;
pub mod handlers;
pub mod images;
pub mod pdf;
pub mod preview;
pub mod qr;
