pub mod eastmoney;

pub use eastmoney::EastmoneyProvider;
