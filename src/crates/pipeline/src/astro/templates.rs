//! Sources of the generated Astro project.
//!
//! Templates carry `%%KEY%%` markers instead of `format!` arguments because Astro and
//! TypeScript sources are full of braces. Page copy never goes through a template: it
//! is written to `src/data/*.json` and imported by the pages.

use serde_json::{json, Value};

/// Replace every `%%KEY%%` marker
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("%%{}%%", key), value);
    }
    out
}

pub const LAYOUT: &str = r#"---
import SEO from '../components/SEO.astro';
import Header from '../components/Header.astro';
import Footer from '../components/Footer.astro';
import '../styles/critical.css';
import '../styles/site.css';

interface Props {
  title: string;
  description: string;
  schema?: unknown;
}

const { title, description, schema } = Astro.props;
---
<!doctype html>
<html lang="fr">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <meta name="theme-color" content="%%PRIMARY%%" />
    <link rel="manifest" href="/manifest.json" />
    <link rel="icon" href="/favicon.ico" />
    <SEO title={title} description={description} schema={schema} />
  </head>
  <body>
    <Header />
    <main>
      <slot />
    </main>
    <Footer />
    <script>
      if ('serviceWorker' in navigator) {
        navigator.serviceWorker.register('/sw.js');
      }
    </script>
  </body>
</html>
"#;

pub const HEADER: &str = r#"---
import { site } from '../lib/site';
---
<header class="site-header">
  <div class="container header-inner">
    <a href="/" class="brand">{site.name}</a>
    <nav aria-label="Navigation principale">
      <a href="/">Accueil</a>
      <a href="/#services">Services</a>
      <a href="/a-propos">À propos</a>
      <a href="/contact">Contact</a>
    </nav>
    {site.phone && (
      <a class="btn btn-primary" href={`tel:${site.phone.replace(/\s/g, '')}`}>{site.phone}</a>
    )}
  </div>
</header>
"#;

pub const FOOTER: &str = r#"---
import { site } from '../lib/site';

const year = new Date().getFullYear();
---
<footer class="site-footer">
  <div class="container">
    <p><strong>{site.name}</strong> · {site.businessType} à {site.city}</p>
    <ul class="footer-services">
      {site.services.map((service) => (
        <li><a href={`/services/${service.slug}`}>{service.title}</a></li>
      ))}
    </ul>
    <p>© {year} {site.name} · <a href="/mentions-legales">Mentions légales</a></p>
  </div>
</footer>
"#;

pub const HERO: &str = r#"---
interface Props {
  hero: {
    title: string;
    subtitle: string;
    description: string;
    ctaPrimary: string;
    ctaSecondary: string;
  };
}

const { hero } = Astro.props;
---
<section class="hero">
  <div class="container">
    <h1>{hero.title}</h1>
    {hero.subtitle && <p class="hero-subtitle">{hero.subtitle}</p>}
    <p>{hero.description}</p>
    <div class="hero-actions">
      <a class="btn btn-primary" href="/contact">{hero.ctaPrimary || 'Demander un devis'}</a>
      <a class="btn btn-secondary" href="/#services">{hero.ctaSecondary || 'Nos services'}</a>
    </div>
  </div>
</section>
"#;

pub const SERVICES: &str = r#"---
import { site } from '../lib/site';

interface Service {
  title: string;
  description: string;
  features: string[];
}

interface Props {
  services: Service[];
}

const { services } = Astro.props;
---
<section id="services" class="services">
  <div class="container">
    <h2>Nos services</h2>
    <div class="grid">
      {services.map((service, index) => (
        <article class="card">
          <h3>{service.title}</h3>
          <p>{service.description}</p>
          {service.features.length > 0 && (
            <ul>{service.features.map((feature) => <li>{feature}</li>)}</ul>
          )}
          {site.services[index] && (
            <a href={`/services/${site.services[index].slug}`}>En savoir plus</a>
          )}
        </article>
      ))}
    </div>
  </div>
</section>
"#;

pub const ABOUT: &str = r#"---
interface Props {
  story: string;
  mission?: string;
  values: string[];
}

const { story, mission, values } = Astro.props;
---
<section class="about">
  <div class="container">
    <h2>À propos</h2>
    <p>{story}</p>
    {mission && <p class="mission">{mission}</p>}
    {values.length > 0 && (
      <ul class="values">{values.map((value) => <li>{value}</li>)}</ul>
    )}
  </div>
</section>
"#;

pub const CONTACT: &str = r#"---
import { site } from '../lib/site';

interface Hours {
  day: string;
  open: string;
  close: string;
}

interface Props {
  contact: {
    intro: string;
    zones: string[];
    hours: Hours[];
    emergencyInfo: string;
  };
}

const { contact } = Astro.props;
---
<section id="contact" class="contact">
  <div class="container">
    <h2>Contact</h2>
    <p>{contact.intro}</p>
    <ul class="contact-details">
      {site.phone && <li>Téléphone : <a href={`tel:${site.phone.replace(/\s/g, '')}`}>{site.phone}</a></li>}
      {site.email && <li>Email : <a href={`mailto:${site.email}`}>{site.email}</a></li>}
      {site.address && <li>Adresse : {site.address}</li>}
    </ul>
    {contact.emergencyInfo && <p class="emergency">{contact.emergencyInfo}</p>}
    <h3>Horaires</h3>
    <table class="hours">
      {contact.hours.map((h) => (
        <tr><th>{h.day}</th><td>{h.open === 'Fermé' ? 'Fermé' : `${h.open} - ${h.close}`}</td></tr>
      ))}
    </table>
    {contact.zones.length > 0 && (
      <p class="zones">Zones d'intervention : {contact.zones.join(', ')}</p>
    )}
  </div>
</section>
"#;

pub const SEO: &str = r#"---
import { site } from '../lib/site';

interface Props {
  title: string;
  description: string;
  schema?: unknown;
}

const { title, description, schema } = Astro.props;
const canonical = new URL(Astro.url.pathname, site.url).toString();
---
<title>{title}</title>
<meta name="description" content={description} />
<link rel="canonical" href={canonical} />
<meta property="og:type" content="website" />
<meta property="og:locale" content="fr_FR" />
<meta property="og:title" content={title} />
<meta property="og:description" content={description} />
<meta property="og:url" content={canonical} />
{schema && <script type="application/ld+json" set:html={JSON.stringify(schema)} />}
"#;

pub const INDEX_PAGE: &str = r#"---
import Layout from '../layouts/Layout.astro';
import Hero from '../components/Hero.astro';
import Services from '../components/Services.astro';
import About from '../components/About.astro';
import Contact from '../components/Contact.astro';
import home from '../data/home.json';
import contact from '../data/contact.json';
import seo from '../data/seo.json';
---
<Layout title={seo.titles.home} description={seo.metaDescriptions.home ?? ''} schema={seo.schemas.localBusiness}>
  <Hero hero={home.hero} />
  <Services services={home.services} />
  <About story={home.about.story} mission={home.about.mission} values={home.about.values} />
  {home.whyUs.length > 0 && (
    <section class="why-us">
      <div class="container">
        <h2>Pourquoi nous choisir</h2>
        <div class="grid">
          {home.whyUs.map((item) => (
            <article class="card"><h3>{item.title}</h3><p>{item.description}</p></article>
          ))}
        </div>
      </div>
    </section>
  )}
  {home.processus.length > 0 && (
    <section class="process">
      <div class="container">
        <h2>Notre méthode</h2>
        <ol>
          {home.processus.map((step) => (
            <li><strong>{step.title}</strong> {step.description}</li>
          ))}
        </ol>
      </div>
    </section>
  )}
  <Contact contact={contact} />
</Layout>
"#;

pub const ABOUT_PAGE: &str = r#"---
import Layout from '../layouts/Layout.astro';
import About from '../components/About.astro';
import about from '../data/about.json';
import seo from '../data/seo.json';
---
<Layout title={seo.titles.about} description={seo.metaDescriptions.about ?? ''} schema={seo.schemas.organization}>
  <About story={about.story} values={about.values} />
  <section class="container">
    {about.team && <><h2>Notre équipe</h2><p>{about.team}</p></>}
    {about.experience && <><h2>Notre expérience</h2><p>{about.experience}</p></>}
    {about.localHistory && <p>{about.localHistory}</p>}
    {about.certifications.length > 0 && (
      <>
        <h2>Certifications</h2>
        <ul>{about.certifications.map((c) => <li>{c}</li>)}</ul>
      </>
    )}
  </section>
</Layout>
"#;

pub const CONTACT_PAGE: &str = r#"---
import Layout from '../layouts/Layout.astro';
import Contact from '../components/Contact.astro';
import contact from '../data/contact.json';
import seo from '../data/seo.json';
---
<Layout title={seo.titles.contact} description={seo.metaDescriptions.contact ?? ''} schema={seo.schemas.localBusiness}>
  <Contact contact={contact} />
</Layout>
"#;

pub const LEGAL_PAGE: &str = r#"---
import Layout from '../layouts/Layout.astro';
import legal from '../data/legal.json';
import seo from '../data/seo.json';

const sections = [
  ['Mentions légales', legal.mentionsLegales],
  ['Politique de confidentialité', legal.politiqueConfidentialite],
  ["Conditions d'utilisation", legal.conditionsUtilisation],
  ['Cookies', legal.cookies],
].filter(([, text]) => text);
---
<Layout title={seo.titles.legal} description={`Mentions légales de ${seo.titles.home}`}>
  <section class="container legal">
    {sections.map(([heading, text]) => (
      <article>
        <h2>{heading}</h2>
        {text.split('\n').filter(Boolean).map((line) => <p>{line}</p>)}
      </article>
    ))}
  </section>
</Layout>
"#;

pub const SERVICE_PAGE: &str = r#"---
import Layout from '../../layouts/Layout.astro';
import service from '../../data/services/%%SLUG%%.json';
import seo from '../../data/seo.json';

const breadcrumbs = seo.breadcrumbs['%%SLUG%%'] ?? [];
const schema = {
  '@context': 'https://schema.org',
  '@type': 'BreadcrumbList',
  itemListElement: breadcrumbs.map((crumb, index) => ({
    '@type': 'ListItem',
    position: index + 1,
    name: crumb.name,
    item: crumb.url,
  })),
};
---
<Layout title={service.title} description={service.metaDescription} schema={schema}>
  <section class="service-hero">
    <div class="container">
      <h1>{service.title}</h1>
      <p>{service.heroContent}</p>
    </div>
  </section>
  <section class="container">
    <p>{service.detailedDescription}</p>
    {service.benefits.length > 0 && (
      <>
        <h2>Les avantages</h2>
        <ul>{service.benefits.map((benefit) => <li>{benefit}</li>)}</ul>
      </>
    )}
    {service.process.length > 0 && (
      <>
        <h2>Déroulement</h2>
        <ol>{service.process.map((step) => <li><strong>{step.title}</strong> {step.description}</li>)}</ol>
      </>
    )}
    {service.faq.length > 0 && (
      <>
        <h2>Questions fréquentes</h2>
        {service.faq.map((item) => (
          <details><summary>{item.question}</summary><p>{item.answer}</p></details>
        ))}
      </>
    )}
    <p><a class="btn btn-primary" href="/contact">Demander un devis</a></p>
  </section>
</Layout>
"#;

pub const SITE_MODULE: &str = r#"// Identity of the site, shared by every component.
export const site = %%SITE_JSON%%;
"#;

pub const ASTRO_CONFIG: &str = r#"import { defineConfig } from 'astro/config';
import tailwind from '@astrojs/tailwind';
import sitemap from '@astrojs/sitemap';

export default defineConfig({
  site: '%%SITE_URL%%',
  output: 'static',
  compressHTML: true,
  integrations: [tailwind({ applyBaseStyles: false }), sitemap()],
  build: {
    format: 'directory',
    assets: 'assets',
    inlineStylesheets: 'auto',
  },
});
"#;

pub const TAILWIND_CONFIG: &str = r#"/** @type {import('tailwindcss').Config} */
export default {
  content: ['./src/**/*.{astro,html,js,ts,md}'],
  theme: {
    extend: {
      colors: {
        primary: '%%PRIMARY%%',
        secondary: '%%SECONDARY%%',
        accent: '%%ACCENT%%',
      },
      fontFamily: {
        sans: ['system-ui', 'sans-serif'],
      },
    },
  },
  plugins: [],
};
"#;

pub const WRANGLER_CONFIG: &str = r#"name = "%%PROJECT_NAME%%"
compatibility_date = "2023-10-30"
pages_build_output_dir = "dist"

[env.production]
name = "%%PROJECT_NAME%%"
"#;

pub const NETLIFY_CONFIG: &str = r#"[build]
  publish = "dist"
  command = "npm run build"

[[headers]]
  for = "/*"
  [headers.values]
    X-Frame-Options = "DENY"
    X-Content-Type-Options = "nosniff"
    Referrer-Policy = "strict-origin-when-cross-origin"
    Strict-Transport-Security = "max-age=31536000; includeSubDomains"

[[redirects]]
  from = "/admin"
  to = "%%STUDIO_URL%%"
  status = 302
"#;

pub const SERVICE_WORKER: &str = r#"const CACHE_NAME = 'site-%%PROJECT_NAME%%-v1';
const PRECACHE = ['/', '/manifest.json'];

self.addEventListener('install', (event) => {
  event.waitUntil(caches.open(CACHE_NAME).then((cache) => cache.addAll(PRECACHE)));
});

self.addEventListener('activate', (event) => {
  event.waitUntil(
    caches.keys().then((keys) =>
      Promise.all(keys.filter((key) => key !== CACHE_NAME).map((key) => caches.delete(key)))
    )
  );
});

self.addEventListener('fetch', (event) => {
  if (event.request.method !== 'GET') return;
  event.respondWith(
    caches.match(event.request).then((cached) => cached || fetch(event.request))
  );
});
"#;

pub const CRITICAL_CSS: &str = r#":root {
  --primary: %%PRIMARY%%;
  --secondary: %%SECONDARY%%;
  --accent: %%ACCENT%%;
}
body { font-family: system-ui, sans-serif; margin: 0; line-height: 1.6; color: #1f2937; }
.container { max-width: 1200px; margin: 0 auto; padding: 0 1rem; }
.site-header .header-inner { display: flex; align-items: center; justify-content: space-between; gap: 1rem; padding: 1rem; }
.site-header nav a { margin: 0 0.5rem; color: inherit; text-decoration: none; }
.hero { background: linear-gradient(135deg, var(--primary) 0%, var(--secondary) 100%); color: #fff; padding: 4rem 0; }
.btn { display: inline-block; padding: 0.75rem 2rem; border-radius: 0.5rem; font-weight: 600; text-decoration: none; }
.btn-primary { background: var(--accent); color: #fff; }
.btn-secondary { border: 2px solid currentColor; color: inherit; }
.grid { display: grid; gap: 1.5rem; grid-template-columns: repeat(auto-fit, minmax(16rem, 1fr)); }
.card { padding: 1.5rem; border-radius: 0.75rem; box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1); }
"#;

pub const IMAGE_OPTIMIZER: &str = r#"// Resized image URLs for Cloudflare image resizing.
export function optimizeImage(src: string, width?: number, quality = 85): string {
  if (!src) return '';
  const params = new URLSearchParams();
  if (width) params.set('width', String(width));
  params.set('quality', String(quality));
  return `${src}?${params.toString()}`;
}

export function generateSrcSet(src: string, sizes: number[]): string {
  return sizes.map((size) => `${optimizeImage(src, size)} ${size}w`).join(', ');
}
"#;

pub const DEPLOY_SCRIPT: &str = r#"#!/usr/bin/env bash
set -euo pipefail

echo "Déploiement de %%BUSINESS_NAME%%"
npm ci
npm run build
npx wrangler pages deploy dist --project-name=%%PROJECT_NAME%%
echo "Site disponible : %%SITE_URL%%"
"#;

pub const GITHUB_WORKFLOW: &str = r#"name: Deploy to Cloudflare Pages

on:
  push:
    branches: [main]

jobs:
  deploy:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - uses: actions/setup-node@v4
        with:
          node-version: '20'
          cache: 'npm'
      - run: npm ci
      - run: npm run build
      - name: Deploy
        uses: cloudflare/pages-action@v1
        with:
          apiToken: ${{ secrets.CLOUDFLARE_API_TOKEN }}
          accountId: ${{ secrets.CLOUDFLARE_ACCOUNT_ID }}
          projectName: %%PROJECT_NAME%%
          directory: dist
"#;

pub const SANITY_CLIENT: &str = r#"import { createClient } from '@sanity/client';

export const sanityClient = createClient({
  projectId: import.meta.env.PUBLIC_SANITY_PROJECT_ID ?? '%%PROJECT_ID%%',
  dataset: import.meta.env.PUBLIC_SANITY_DATASET ?? '%%DATASET%%',
  apiVersion: '%%API_VERSION%%',
  useCdn: true,
});

export async function getSanityContent<T>(
  query: string,
  params: Record<string, unknown> = {}
): Promise<T | null> {
  try {
    return await sanityClient.fetch<T>(query, params);
  } catch (error) {
    console.error('Sanity fetch failed', error);
    return null;
  }
}
"#;

pub const SANITY_TYPES: &str = r#"export interface SanityDocument {
  _id: string;
  _type: string;
  _createdAt?: string;
  _updatedAt?: string;
}

export interface Settings extends SanityDocument {
  _type: 'settings';
  businessName: string;
  businessType: string;
  phone?: string;
  email?: string;
  address?: string;
}

export interface Service extends SanityDocument {
  _type: 'service';
  title: string;
  slug: { current: string };
  shortDescription?: string;
  price?: string;
  featured?: boolean;
}

export interface Testimonial extends SanityDocument {
  _type: 'testimonial';
  clientName: string;
  content: string;
  rating: number;
}

export interface Project extends SanityDocument {
  _type: 'project';
  title: string;
  description?: string;
  location?: string;
}

export interface Page extends SanityDocument {
  _type: 'page';
  title: string;
  slug: { current: string };
}
"#;

pub const SANITY_QUERIES: &str = r#"export const settingsQuery = `*[_type == "settings"][0]`;
export const servicesQuery = `*[_type == "service"] | order(order asc)`;
export const featuredServicesQuery = `*[_type == "service" && featured == true]`;
export const testimonialsQuery = `*[_type == "testimonial"] | order(_createdAt desc)`;
export const projectsQuery = `*[_type == "project"] | order(_createdAt desc)`;
export const pageBySlugQuery = `*[_type == "page" && slug.current == $slug][0]`;
export const navigationQuery = `*[_type == "navigation"][0]`;
export const seoQuery = `*[_type == "seoConfig"][0]`;
"#;

/// `package.json` of the generated project
pub fn package_json(project_name: &str) -> Value {
    json!({
        "name": project_name,
        "version": "1.0.0",
        "private": true,
        "type": "module",
        "scripts": {
            "dev": "astro dev",
            "build": "astro build",
            "preview": "astro preview",
            "check": "astro check"
        },
        "dependencies": {
            "astro": "^4.0.0",
            "@astrojs/tailwind": "^5.0.0",
            "@astrojs/sitemap": "^3.0.0",
            "@sanity/client": "^6.0.0",
            "tailwindcss": "^3.4.0"
        },
        "devDependencies": {
            "@astrojs/check": "^0.3.0",
            "typescript": "^5.0.0"
        }
    })
}

pub fn tsconfig() -> Value {
    json!({
        "extends": "astro/tsconfigs/strict",
        "compilerOptions": {
            "baseUrl": ".",
            "resolveJsonModule": true,
            "paths": {
                "@/*": ["src/*"],
                "@/components/*": ["src/components/*"],
                "@/layouts/*": ["src/layouts/*"],
                "@/lib/*": ["src/lib/*"]
            }
        }
    })
}

/// Web app manifest; `theme` is the primary brand colour
pub fn manifest(name: &str, description: &str, theme: &str) -> Value {
    json!({
        "name": name,
        "short_name": name,
        "description": description,
        "start_url": "/",
        "display": "standalone",
        "background_color": "#ffffff",
        "theme_color": theme,
        "icons": [
            { "src": "/icon-192.png", "sizes": "192x192", "type": "image/png" },
            { "src": "/icon-512.png", "sizes": "512x512", "type": "image/png" }
        ]
    })
}

/// Cloudflare Pages cache and security headers written to `dist/_headers`
pub const HEADERS_FILE: &str = "# Static assets
/assets/*
  Cache-Control: public, max-age=31536000, immutable

/images/*
  Cache-Control: public, max-age=31536000

/*
  X-Frame-Options: DENY
  X-Content-Type-Options: nosniff
  Referrer-Policy: strict-origin-when-cross-origin
  Permissions-Policy: geolocation=(), camera=(), microphone=()
  Strict-Transport-Security: max-age=31536000; includeSubDomains; preload

/*.html
  Cache-Control: no-cache, no-store, must-revalidate

/api/*
  Cache-Control: no-cache
";

/// Redirect rules written to `dist/_redirects`
pub const REDIRECTS_FILE: &str = "/api/* https://api.awema.fr/:splat 301
/* /index.html 200
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_marker() {
        let out = render(TAILWIND_CONFIG, &[("PRIMARY", "#2563eb"), ("SECONDARY", "#1e40af"), ("ACCENT", "#3b82f6")]);
        assert!(out.contains("primary: '#2563eb'"));
        assert!(out.contains("accent: '#3b82f6'"));
        assert!(!out.contains("%%"));
    }

    #[test]
    fn test_service_page_imports_its_data() {
        let out = render(SERVICE_PAGE, &[("SLUG", "debouchage")]);
        assert!(out.contains("import service from '../../data/services/debouchage.json';"));
        assert!(out.contains("seo.breadcrumbs['debouchage']"));
    }

    #[test]
    fn test_github_workflow_keeps_secret_expressions() {
        let out = render(GITHUB_WORKFLOW, &[("PROJECT_NAME", "dupont-plomberie-fr")]);
        assert!(out.contains("${{ secrets.CLOUDFLARE_API_TOKEN }}"));
        assert!(out.contains("projectName: dupont-plomberie-fr"));
    }

    #[test]
    fn test_redirects_api_rule_before_fallback() {
        let api = REDIRECTS_FILE.find("/api/*").unwrap();
        let fallback = REDIRECTS_FILE.find("/* /index.html").unwrap();
        assert!(api < fallback);
    }
}
