pub mod leantime;
