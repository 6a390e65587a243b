pub mod view_oracle;
