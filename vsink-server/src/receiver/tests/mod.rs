mod clair;
mod mail;
mod rset;
